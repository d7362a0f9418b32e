mod resolver;
mod template;

pub use resolver::{prompts_from_sheet, resolve, resolve_prompt, PromptData, PromptResult};
pub use template::{
    first_line, render_subtopics, strip_markdown, substitute_keyword, substitute_subtopics,
    system_instruction, theme_hits, title_case, KEYWORD_THEMES,
};
