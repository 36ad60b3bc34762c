pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the provided context to answer the user's question accurately and concisely. If the context doesn't contain relevant information, say so clearly.";

/// Renders the single-string prompt sent to the generation model.
pub fn build_prompt(system_prompt: Option<&str>, context: &[String], question: &str) -> String {
    let system_prompt = system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let context_text = context
        .iter()
        .enumerate()
        .map(|(i, passage)| format!("Context {}: {}", i + 1, passage))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "System: {system_prompt}\n\nContext:\n{context_text}\n\nUser Question: {question}\n\nAnswer:"
    )
}
