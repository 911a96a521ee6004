use serde::{Deserialize, Serialize};

use super::{ChecklistKey, TemplateType};

/// One room of a template and the items inspected in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRoom {
    pub room: String,
    pub items: Vec<String>,
}

impl TemplateRoom {
    pub fn new<I, S>(room: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            room: room.into(),
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

/// A reusable room-and-item layout a checklist is started from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    pub id: i64,
    pub name: String,
    pub template_type: TemplateType,
    pub rooms: Vec<TemplateRoom>,
    pub is_default: bool,
    pub created_at: String,
}

impl ChecklistTemplate {
    /// Every (room, item) pair in template order.
    pub fn keys(&self) -> impl Iterator<Item = ChecklistKey> + '_ {
        self.rooms.iter().flat_map(|room| {
            room.items
                .iter()
                .map(move |item| ChecklistKey::new(room.room.as_str(), item.as_str()))
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub template_type: TemplateType,
    pub rooms: Vec<TemplateRoom>,
}

impl NewTemplate {
    pub fn new(name: impl Into<String>, template_type: TemplateType) -> Self {
        Self {
            name: name.into(),
            template_type,
            rooms: Vec::new(),
        }
    }

    pub fn with_room(mut self, room: TemplateRoom) -> Self {
        self.rooms.push(room);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_follow_room_order() {
        let template = ChecklistTemplate {
            id: 1,
            name: "Studio".to_string(),
            template_type: TemplateType::Apartment,
            rooms: vec![
                TemplateRoom::new("sala", ["piso", "janela"]),
                TemplateRoom::new("banheiro", ["pia"]),
            ],
            is_default: false,
            created_at: String::new(),
        };
        let keys: Vec<String> = template.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["sala/piso", "sala/janela", "banheiro/pia"]);
    }
}
