//! MCP tool definitions for imsg

use serde_json::json;

use super::protocol::ToolDefinition;

/// All tool definitions: (name, description, JSON schema)
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[
    // Messages
    (
        "search_messages",
        "Search messages by text, sender handle and date range. Results are newest first and paginated.",
        r#"{
            "type": "object",
            "properties": {
                "text": {"type": "string", "description": "Case-insensitive substring of the message text"},
                "handle": {"type": "string", "description": "Exact sender handle (phone number in +1... form, or email)"},
                "start_time": {"type": "string", "format": "date-time", "description": "Only messages at or after this instant (RFC 3339)"},
                "end_time": {"type": "string", "format": "date-time", "description": "Only messages at or before this instant (RFC 3339)"},
                "limit": {"type": "integer", "minimum": 1, "maximum": 200, "default": 100},
                "offset": {"type": "integer", "minimum": 0, "default": 0}
            }
        }"#,
    ),
    (
        "get_recent_messages",
        "Most recent messages across all conversations",
        r#"{
            "type": "object",
            "properties": {
                "limit": {"type": "integer", "minimum": 1, "maximum": 200, "default": 100},
                "offset": {"type": "integer", "minimum": 0, "default": 0}
            }
        }"#,
    ),
    (
        "get_conversation_messages",
        "Messages in one conversation, newest first",
        r#"{
            "type": "object",
            "properties": {
                "chat_guid": {"type": "string", "description": "Conversation guid as returned by list_conversations"},
                "limit": {"type": "integer", "minimum": 1, "maximum": 200, "default": 100},
                "offset": {"type": "integer", "minimum": 0, "default": 0}
            },
            "required": ["chat_guid"]
        }"#,
    ),
    // Conversations and handles
    (
        "list_conversations",
        "List conversations, most recently read first",
        r#"{
            "type": "object",
            "properties": {
                "limit": {"type": "integer", "minimum": 1, "maximum": 200, "default": 100},
                "offset": {"type": "integer", "minimum": 0, "default": 0}
            }
        }"#,
    ),
    (
        "list_handles",
        "List every phone number and email address known to the message archive",
        r#"{
            "type": "object",
            "properties": {
                "limit": {"type": "integer", "minimum": 1, "maximum": 200, "default": 100},
                "offset": {"type": "integer", "minimum": 0, "default": 0}
            }
        }"#,
    ),
    // Contacts
    (
        "search_contacts",
        "Search contacts by name across all contact databases. Returns one entry per phone number or email, usable as a message handle.",
        r#"{
            "type": "object",
            "properties": {
                "first_name": {"type": "string", "description": "First name, or any name/organization/nickname fragment when last_name is omitted. Empty lists every contact."},
                "last_name": {"type": "string", "description": "Last name fragment"},
                "limit": {"type": "integer", "minimum": 1, "maximum": 200, "default": 100},
                "offset": {"type": "integer", "minimum": 0, "default": 0}
            },
            "required": ["first_name"]
        }"#,
    ),
    (
        "lookup_contact",
        "Find the contact that owns a phone number or email address",
        r#"{
            "type": "object",
            "properties": {
                "handle": {"type": "string", "description": "Phone number or email address"}
            },
            "required": ["handle"]
        }"#,
    ),
];

/// Get all tool definitions as ToolDefinition structs
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schemas_parse() {
        for (name, _, schema) in TOOL_DEFINITIONS {
            let parsed: serde_json::Value = serde_json::from_str(schema)
                .unwrap_or_else(|e| panic!("schema for {} is invalid: {}", name, e));
            assert_eq!(parsed["type"], "object", "{}", name);
        }
        assert_eq!(get_tool_definitions().len(), TOOL_DEFINITIONS.len());
    }
}
