//! Prompt templates and placeholder substitution for card extraction.

/// Content longer than this is truncated before templating.
pub const MAX_PROMPT_CONTENT_CHARS: usize = 3800;

const TRUNCATION_MARKER: &str = "...[content truncated]";

/// System prompt sent with every chat request.
pub const SYSTEM_PROMPT: &str = "You are a study assistant that extracts structured knowledge \
from learning material. Turn the content the user provides into flashcards, each with a short \
keyword on the front and a clear explanation on the back.";

const DEFAULT_TEMPLATE: &str = "\
Extract the following learning content into knowledge cards:

File: {file_name}
Current block: part {chunk_index}
Starting number: {start_id}

Requirements:
1. Identify the main knowledge points (concepts, definitions, principles)
2. Extract a keyword for each knowledge point (2-5 words)
3. Provide a concise, accurate explanation (50-200 characters)
4. Number the items in logical order

Content:
{content}

Reply in JSON with these fields:
- file_tag: subject label for the file
- sections: list of sections, each with section_title and items
- items: knowledge points, each with item_id, keyword, explanation
";

const MATH_TEMPLATE: &str = "\
Extract the formulas, theorems, and solution methods from this math content:

File: {file_name}
Current block: part {chunk_index}

Requirements:
1. Extract formulas and theorems
2. Note where and under which conditions each applies
3. Give a short worked example
4. Number items starting from {start_id}

Content:
{content}

Reply in JSON with file_tag, sections (section_title, items), and items \
(item_id, keyword, explanation).
";

const ENGLISH_TEMPLATE: &str = "\
Extract the vocabulary, grammar, and expressions from this English content:

File: {file_name}
Current block: part {chunk_index}

Requirements:
1. Extract important words and phrases
2. Note part of speech and usage
3. Provide example sentences with translations
4. Number items starting from {start_id}

Content:
{content}

Reply in JSON with file_tag, sections (section_title, items), and items \
(item_id, keyword, explanation).
";

const HISTORY_TEMPLATE: &str = "\
Extract the events, figures, and timeline from this history content:

File: {file_name}
Current block: part {chunk_index}

Requirements:
1. Extract historical events and figures
2. Note dates and places
3. Provide background and consequences
4. Number items starting from {start_id}

Content:
{content}

Reply in JSON with file_tag, sections (section_title, items), and items \
(item_id, keyword, explanation).
";

const PHYSICS_TEMPLATE: &str = "\
Extract the laws, formulas, and experimental methods from this physics content:

File: {file_name}
Current block: part {chunk_index}

Requirements:
1. Extract physical laws and formulas
2. Note units and dimensions
3. Describe where each applies
4. Number items starting from {start_id}

Content:
{content}

Reply in JSON with file_tag, sections (section_title, items), and items \
(item_id, keyword, explanation).
";

const CHEMISTRY_TEMPLATE: &str = "\
Extract the reactions, elements, and experimental methods from this chemistry content:

File: {file_name}
Current block: part {chunk_index}

Requirements:
1. Extract reactions and element properties
2. Note reaction conditions and products
3. Outline the experimental steps
4. Number items starting from {start_id}

Content:
{content}

Reply in JSON with file_tag, sections (section_title, items), and items \
(item_id, keyword, explanation).
";

/// Build the user prompt for one chunk.
///
/// Long content is cut at [`MAX_PROMPT_CONTENT_CHARS`] with a visible
/// marker; the item numbering for the chunk starts at
/// `chunk_index * 100 + 1` so ids from different chunks never collide.
pub fn build_prompt(content: &str, file_name: &str, chunk_index: usize) -> String {
    let template = select_template(file_name);

    let processed_content = if content.chars().count() > MAX_PROMPT_CONTENT_CHARS {
        log::warn!(
            "prompt content for chunk {} truncated to {} chars",
            chunk_index,
            MAX_PROMPT_CONTENT_CHARS
        );
        let truncated: String = content.chars().take(MAX_PROMPT_CONTENT_CHARS).collect();
        format!("{}{}", truncated, TRUNCATION_MARKER)
    } else {
        content.to_string()
    };

    let start_id = chunk_index * 100 + 1;

    template
        .replace("{content}", &processed_content)
        .replace("{file_name}", file_name)
        .replace("{chunk_index}", &chunk_index.to_string())
        .replace("{start_id}", &start_id.to_string())
}

/// Pick a subject template by filename keyword.
fn select_template(file_name: &str) -> &'static str {
    let name = file_name.to_lowercase();
    if name.contains("math") || name.contains("数学") {
        MATH_TEMPLATE
    } else if name.contains("english") || name.contains("英语") {
        ENGLISH_TEMPLATE
    } else if name.contains("history") || name.contains("历史") {
        HISTORY_TEMPLATE
    } else if name.contains("physics") || name.contains("物理") {
        PHYSICS_TEMPLATE
    } else if name.contains("chemistry") || name.contains("化学") {
        CHEMISTRY_TEMPLATE
    } else {
        DEFAULT_TEMPLATE
    }
}
