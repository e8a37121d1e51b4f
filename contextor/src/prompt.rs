//! Prompt builder: QA and refine templates plus context packing.

/// System instructions shared by the QA and refine calls.
///
/// Keep this short: small local models follow brief instructions best.
pub const DEFAULT_SYSTEM: &str = "You answer questions about a PDF document. \
Use the provided context as ground truth and do not rely on prior knowledge. \
If the context does not contain the answer, say so.";

/// Separator placed between chunks packed into the same block.
const CHUNK_SEPARATOR: &str = "\n\n";

/// First synthesis call: answer `question` from `context`.
///
/// # Example
/// ```
/// # use contextor::prompt::text_qa_prompt;
/// let p = text_qa_prompt("Invoices are due in 30 days.", "When are invoices due?");
/// assert!(p.contains("Query: When are invoices due?"));
/// ```
pub fn text_qa_prompt(context: &str, question: &str) -> String {
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {}\n\
         Answer: ",
        context.trim(),
        question.trim()
    )
}

/// Follow-up synthesis call: improve `existing_answer` with another block.
pub fn refine_prompt(question: &str, existing_answer: &str, context: &str) -> String {
    format!(
        "The original query is as follows: {}\n\
         We have provided an existing answer: {}\n\
         We have the opportunity to refine the existing answer (only if needed) \
         with some more context below.\n\
         ------------\n\
         {}\n\
         ------------\n\
         Given the new context, refine the original answer to better answer the query. \
         If the context isn't useful, return the original answer.\n\
         Refined Answer: ",
        question.trim(),
        existing_answer.trim(),
        context.trim()
    )
}

/// Packs chunk texts, in rank order, into as few blocks of at most
/// `max_chars` characters as possible. A chunk longer than the budget is cut
/// into budget-sized pieces.
pub fn pack_blocks<S: AsRef<str>>(texts: &[S], max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let sep_len = CHUNK_SEPARATOR.chars().count();

    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for piece in texts.iter().flat_map(|t| cut(t.as_ref().trim(), max_chars)) {
        let len = piece.chars().count();
        if len == 0 {
            continue;
        }
        let needed = if current_len == 0 { len } else { len + sep_len };
        if current_len > 0 && current_len + needed > max_chars {
            blocks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push_str(CHUNK_SEPARATOR);
            current_len += sep_len;
        }
        current.push_str(piece);
        current_len += len;
    }

    if current_len > 0 {
        blocks.push(current);
    }
    blocks
}

/// Splits `s` into pieces of at most `max` chars on char boundaries.
fn cut(s: &str, max: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        let piece = safe_truncate(rest, max);
        out.push(piece);
        rest = &rest[piece.len()..];
    }
    out
}

/// Longest prefix of `s` with at most `max_chars` characters.
fn safe_truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
