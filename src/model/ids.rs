//! Typed string identifiers.

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identity of a support agent.
    AgentId
);
string_id!(
    /// Identity of an agent team.
    TeamId
);
string_id!(TicketId);
string_id!(CategoryId);
string_id!(SubcategoryId);
string_id!(
    /// Identity of an assignment rule.
    RuleId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_order_lexicographically() {
        let mut ids = vec![AgentId::from("b"), AgentId::from("a"), AgentId::from("c")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
        assert_eq!(ids[2].to_string(), "c");
    }
}
