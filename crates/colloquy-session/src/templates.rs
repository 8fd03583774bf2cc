pub const SUBJECT_PLACEHOLDER: &str = "<subject>";
pub const QUESTION_DELIMITER: &str = "%%";

pub const DESCRIPTION_TEMPLATE: &str = r#"Write a concise description (at most three sentences) of the domain covered by the following material. Reply with the description only.

<subject>"#;

pub const TITLE_TEMPLATE: &str = r#"Write a short title (at most six words) for a conversation that starts with the following text. Reply with the title only, without quotes.

<subject>"#;

pub const SAMPLE_QUESTIONS_TEMPLATE: &str = r#"For the context following, please provide a list of <count> questions with a maximum of <max_words> words per question. Return the questions as a string with delimiter '%%' between each generated question.

<subject>"#;

/// Substitute the subject into a template. Templates without the placeholder
/// get the subject appended after a blank line.
pub fn render(template: &str, subject: &str) -> String {
    if template.contains(SUBJECT_PLACEHOLDER) {
        template.replace(SUBJECT_PLACEHOLDER, subject)
    } else {
        format!("{}\n\n{}", template.trim_end(), subject)
    }
}

pub fn sample_questions_prompt(context: &str, count: usize, max_words: usize) -> String {
    let template = SAMPLE_QUESTIONS_TEMPLATE
        .replace("<count>", &count.to_string())
        .replace("<max_words>", &max_words.to_string());
    render(&template, context)
}

/// Split a `%%`-delimited reply into trimmed, non-empty questions
pub fn split_questions(reply: &str) -> Vec<String> {
    reply
        .split(QUESTION_DELIMITER)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect()
}
