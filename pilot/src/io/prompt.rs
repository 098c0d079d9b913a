//! Prompt builders for the canned assistant actions.

use anyhow::Result;
use minijinja::{Environment, context};

use crate::core::text::truncate_chars;

const SUMMARIZE_TEXT_TEMPLATE: &str = include_str!("prompts/summarize_text.md");
const TRANSFORM_TEMPLATE: &str = include_str!("prompts/transform.md");
const SUMMARIZE_FILE_TEMPLATE: &str = include_str!("prompts/summarize_file.md");

/// Files longer than this many characters are cut before prompting.
pub const MAX_FILE_CHARS: usize = 100_000;
/// Session display names keep this many leading characters of the first prompt.
pub const SESSION_NAME_CHARS: usize = 40;

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("summarize_text", SUMMARIZE_TEXT_TEMPLATE)
            .expect("summarize_text template should be valid");
        env.add_template("transform", TRANSFORM_TEMPLATE)
            .expect("transform template should be valid");
        env.add_template("summarize_file", SUMMARIZE_FILE_TEMPLATE)
            .expect("summarize_file template should be valid");
        Self { env }
    }

    pub fn summarize_text(&self, text: &str) -> Result<String> {
        let template = self.env.get_template("summarize_text")?;
        Ok(template.render(context! { text => text })?)
    }

    pub fn transform(&self, text: &str, instruction: &str) -> Result<String> {
        let template = self.env.get_template("transform")?;
        Ok(template.render(context! { text => text, instruction => instruction })?)
    }

    pub fn summarize_file(&self, filename: Option<&str>, content: &str) -> Result<String> {
        let template = self.env.get_template("summarize_file")?;
        Ok(template.render(context! {
            filename => filename.unwrap_or("unknown"),
            content => content,
        })?)
    }
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode file bytes for summarizing.
///
/// Returns `None` for non-UTF-8 or blank content; long files are truncated.
pub fn prepare_file_content(data: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(data).ok()?;
    if text.trim().is_empty() {
        return None;
    }
    Some(truncate_chars(
        text,
        MAX_FILE_CHARS,
        &format!("\n\n[Truncated: file exceeds {MAX_FILE_CHARS} characters]"),
    ))
}

/// Display name derived from the first prompt of a session.
pub fn session_display_name(prompt: &str) -> String {
    prompt.trim().chars().take(SESSION_NAME_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_text_prompt() {
        let prompt = PromptEngine::new()
            .summarize_text("The quick brown fox.")
            .expect("render");
        assert_eq!(
            prompt,
            "Summarize the following text concisely:\n\nThe quick brown fox."
        );
    }

    #[test]
    fn transform_prompt_contains_instruction_and_text() {
        let prompt = PromptEngine::new()
            .transform("hello <world> & you", "Make it formal")
            .expect("render");
        assert!(prompt.starts_with("Transform the following text according to the instruction."));
        assert!(prompt.contains("Instruction: Make it formal"));
        assert!(prompt.ends_with("Text:\nhello <world> & you"));
    }

    #[test]
    fn summarize_file_prompt_defaults_filename() {
        let engine = PromptEngine::new();
        let named = engine
            .summarize_file(Some("notes.txt"), "content")
            .expect("render");
        assert!(named.contains("Filename: notes.txt"));
        let unnamed = engine.summarize_file(None, "content").expect("render");
        assert!(unnamed.contains("Filename: unknown"));
        assert!(unnamed.ends_with("content"));
    }

    #[test]
    fn prepare_rejects_blank_and_binary() {
        assert_eq!(prepare_file_content(b"   \n\t"), None);
        assert_eq!(prepare_file_content(&[0xff, 0xfe, 0x00]), None);
        assert_eq!(prepare_file_content(b"hi"), Some("hi".to_string()));
    }

    #[test]
    fn prepare_truncates_long_files() {
        let long = "a".repeat(MAX_FILE_CHARS + 10);
        let prepared = prepare_file_content(long.as_bytes()).expect("content");
        assert!(prepared.starts_with(&"a".repeat(MAX_FILE_CHARS)));
        assert!(prepared.ends_with("[Truncated: file exceeds 100000 characters]"));
    }

    #[test]
    fn display_name_keeps_first_forty_chars() {
        let name = session_display_name(&"x".repeat(100));
        assert_eq!(name.chars().count(), SESSION_NAME_CHARS);
        assert_eq!(session_display_name("  short  "), "short");
    }
}
