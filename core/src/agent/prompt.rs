//! Prompt sent to the model for each batch

/// Wrap a rendered batch in the cleaning instructions
pub fn build_batch_prompt(batch_text: &str) -> String {
    format!(
        "\nYou are an AI Data Cleaning Agent. Analyze the dataset:\n\
         {batch_text}\n\
         Identify missing values, choose the best imputation strategy (mean, mode, median), \
         remove duplicates, and format text correctly.\n\
         Return the cleaned data as structured text.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_batch() {
        let prompt = build_batch_prompt("   a\n0  1");
        assert!(prompt.starts_with(
            "\nYou are an AI Data Cleaning Agent. Analyze the dataset:\n   a\n0  1\n"
        ));
        assert!(prompt.contains("(mean, mode, median), remove duplicates"));
        assert!(prompt.ends_with("Return the cleaned data as structured text.\n"));
    }
}
