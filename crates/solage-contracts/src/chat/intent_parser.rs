use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, CHOICE_COMMANDS, EXPORT_COMMAND, NO_ARG_COMMANDS, RAW_ARG_COMMANDS,
};

/// One parsed line of interactive studio input.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            command_args: BTreeMap::new(),
        }
    }

    fn with_arg(mut self, key: &str, value: String) -> Self {
        self.command_args
            .insert(key.to_string(), Value::String(value));
        self
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.command_args
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_arg(arg: &str) -> String {
    if arg.trim().is_empty() {
        return String::new();
    }
    let parts = match shell_words::split(arg) {
        Ok(parts) => parts,
        Err(_) => arg.split_whitespace().map(str::to_string).collect(),
    };
    parts
        .into_iter()
        .filter(|value| !value.is_empty())
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(action) = find_action(&command, CHOICE_COMMANDS) {
                let id = arg.split_whitespace().next().unwrap_or("").to_string();
                return Intent::new(action, text).with_arg("id", id);
            }

            if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
                let key = if action == "search" { "query" } else { "model" };
                return Intent::new(action, text).with_arg(key, arg.to_string());
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action, text);
            }

            if command == EXPORT_COMMAND.command {
                return Intent::new(EXPORT_COMMAND.action, text)
                    .with_arg("path", parse_path_arg(arg));
            }

            return Intent::new("unknown", text)
                .with_arg("command", command)
                .with_arg("arg", arg.to_string());
        }
    }

    // Bare text filters the catalog, like typing into the search box.
    Intent::new("search", text).with_arg("query", raw_trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_intent;

    #[test]
    fn parse_choice_commands_keep_first_token() {
        let product = parse_intent("/product detox");
        assert_eq!(product.action, "choose_product");
        assert_eq!(product.arg("id"), Some("detox"));

        let angle = parse_intent("  /ANGLE   promotional extra ");
        assert_eq!(angle.action, "choose_angle");
        assert_eq!(angle.command_args["id"], json!("promotional"));

        let visual = parse_intent("/visual");
        assert_eq!(visual.action, "choose_visual");
        assert_eq!(visual.arg("id"), None);
    }

    #[test]
    fn parse_no_arg_commands() {
        assert_eq!(parse_intent("/back").action, "back");
        assert_eq!(parse_intent("/new").action, "reset");
        assert_eq!(parse_intent("/camera").action, "open_camera");
        assert_eq!(parse_intent("/capture").action, "capture_photo");
        assert_eq!(parse_intent("/trends").action, "research_trends");
    }

    #[test]
    fn parse_export_quoted_path() {
        let export = parse_intent("/export \"/tmp/my campaign\"");
        assert_eq!(export.action, "export");
        assert_eq!(export.arg("path"), Some("/tmp/my campaign"));
    }

    #[test]
    fn parse_model_commands() {
        let text_model = parse_intent("/text_model gemini-2.5-flash");
        assert_eq!(text_model.action, "set_text_model");
        assert_eq!(text_model.arg("model"), Some("gemini-2.5-flash"));
    }

    #[test]
    fn bare_text_becomes_a_catalog_search() {
        let search = parse_intent("  collagène ");
        assert_eq!(search.action, "search");
        assert_eq!(search.arg("query"), Some("collagène"));
        assert_eq!(parse_intent("   ").action, "noop");
    }

    #[test]
    fn parse_unknown_command() {
        let intent = parse_intent("/magic foo bar");
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.command_args["command"], json!("magic"));
        assert_eq!(intent.command_args["arg"], json!("foo bar"));
    }
}
