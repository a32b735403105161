// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message rendering. Pure functions of the template id and its variables.

use std::fmt::Write as _;

use wordcast_core::types::{MessageTemplate, TemplateVars};

/// Render the plain-text body of a message.
pub fn render(template: MessageTemplate, vars: &TemplateVars) -> String {
    match template {
        MessageTemplate::DailyWord => render_daily_word(vars),
    }
}

fn render_daily_word(vars: &TemplateVars) -> String {
    let mut body = format!("Word {} of {} ({})\n\n", vars.position, vars.total, vars.category);
    let _ = write!(body, "*{}*", vars.word);
    if !vars.part_of_speech.is_empty() {
        let _ = write!(body, " _{}_", vars.part_of_speech);
    }
    if let Some(pronunciation) = vars.pronunciation.as_deref().filter(|p| !p.is_empty()) {
        let _ = write!(body, " /{}/", pronunciation.trim_matches('/'));
    }
    let _ = write!(body, "\n\nMeaning: {}", vars.definition);
    if !vars.example.is_empty() {
        let _ = write!(body, "\nExample: {}", vars.example);
    }
    if let Some(hook) = vars.memory_hook.as_deref().filter(|h| !h.is_empty()) {
        let _ = write!(body, "\nMemory hook: {hook}");
    }
    body
}

/// Ordered parameters for providers that send pre-approved templates.
///
/// Empty optional values are sent as `-`, since providers reject blank
/// template parameters.
pub fn template_params(template: MessageTemplate, vars: &TemplateVars) -> Vec<String> {
    match template {
        MessageTemplate::DailyWord => vec![
            format!("{}/{}", vars.position, vars.total),
            vars.word.clone(),
            or_dash(&vars.part_of_speech),
            or_dash(&vars.definition),
            or_dash(&vars.example),
            or_dash(vars.memory_hook.as_deref().unwrap_or_default()),
        ],
    }
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> TemplateVars {
        TemplateVars {
            word: "ephemeral".into(),
            definition: "lasting a very short time".into(),
            example: "Fame in the internet age is ephemeral.".into(),
            category: "academic-advanced".parse().unwrap(),
            part_of_speech: "adjective".into(),
            pronunciation: Some("ɪˈfem(ə)rəl".into()),
            memory_hook: Some("e-FEM-eral: a mayfly lives one day".into()),
            position: 2,
            total: 3,
        }
    }

    #[test]
    fn daily_word_includes_every_field() {
        let body = render(MessageTemplate::DailyWord, &vars());
        assert!(body.starts_with("Word 2 of 3 (academic-advanced)"));
        assert!(body.contains("*ephemeral* _adjective_ /ɪˈfem(ə)rəl/"));
        assert!(body.contains("Meaning: lasting a very short time"));
        assert!(body.contains("Example: Fame in the internet age is ephemeral."));
        assert!(body.contains("Memory hook: e-FEM-eral"));
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let mut v = vars();
        v.pronunciation = None;
        v.memory_hook = None;
        let body = render(MessageTemplate::DailyWord, &v);
        assert!(!body.contains("Memory hook"));
        assert!(!body.contains('/'));
    }

    #[test]
    fn template_params_are_positional_and_never_blank() {
        let mut v = vars();
        v.memory_hook = None;
        let params = template_params(MessageTemplate::DailyWord, &v);
        assert_eq!(params.len(), 6);
        assert_eq!(params[0], "2/3");
        assert_eq!(params[1], "ephemeral");
        assert_eq!(params[5], "-");
    }
}
