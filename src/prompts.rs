pub const POEM_SYSTEM: &str = include_str!("../data/prompts/poem_system.txt");
pub const POEM_USER: &str = include_str!("../data/prompts/poem_user.txt");
pub const LANGUAGES_SYSTEM: &str = include_str!("../data/prompts/languages_system.txt");
pub const LANGUAGES_USER: &str = include_str!("../data/prompts/languages_user.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Language: {{language}}", &[("language", "French")]),
            "Language: French"
        );
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        assert_eq!(
            render("{{a}} and {{b}}", &[("a", "sun")]),
            "sun and {{b}}"
        );
    }

    #[test]
    fn test_prompts_are_non_empty() {
        assert!(!POEM_SYSTEM.trim().is_empty());
        assert!(!POEM_USER.trim().is_empty());
        assert!(!LANGUAGES_SYSTEM.trim().is_empty());
        assert!(!LANGUAGES_USER.trim().is_empty());
    }

    #[test]
    fn test_user_templates_have_placeholders() {
        assert!(POEM_USER.contains("{{language}}"));
        assert!(LANGUAGES_USER.contains("{{location}}"));
    }
}
