use ragline::application::ports::{TextSplitter, TextSplitterError};
use ragline::domain::{Chunk, DocumentId};
use ragline::infrastructure::text_processing::TokenTextSplitter;

fn numbered_words(count: usize) -> String {
    (0..count)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

async fn split(splitter: &TokenTextSplitter, text: &str) -> Vec<Chunk> {
    splitter
        .split(text, "doc.txt", DocumentId::new())
        .await
        .unwrap()
}

#[test]
fn given_zero_chunk_size_when_created_then_error() {
    let result = TokenTextSplitter::new(0, 0);

    assert!(matches!(result, Err(TextSplitterError::InvalidConfiguration(_))));
}

#[tokio::test]
async fn given_empty_text_when_split_then_no_chunks() {
    let splitter = TokenTextSplitter::new(50, 10).unwrap();

    assert!(split(&splitter, "").await.is_empty());
}

#[tokio::test]
async fn given_long_text_when_split_then_every_chunk_within_token_budget() {
    let splitter = TokenTextSplitter::new(20, 5).unwrap();

    let chunks = split(&splitter, &numbered_words(200)).await;

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(!chunk.text.is_empty());
        assert!(splitter.count_tokens(&chunk.text) <= 20, "{:?}", chunk.text);
    }
}

#[tokio::test]
async fn given_no_overlap_when_split_then_words_are_partitioned_in_order() {
    let splitter = TokenTextSplitter::new(16, 0).unwrap();
    let text = numbered_words(120);

    let chunks = split(&splitter, &text).await;

    let rejoined: Vec<&str> = chunks
        .iter()
        .flat_map(|c| c.text.split_whitespace())
        .collect();
    let original: Vec<&str> = text.split_whitespace().collect();
    assert_eq!(rejoined, original);
}

#[tokio::test]
async fn given_overlap_when_split_then_next_chunk_starts_inside_previous() {
    let splitter = TokenTextSplitter::new(24, 8).unwrap();

    let chunks = split(&splitter, &numbered_words(150)).await;

    assert!(chunks.len() > 2);
    for pair in chunks.windows(2) {
        let first_word = pair[1].text.split_whitespace().next().unwrap();
        assert!(
            pair[0].text.split_whitespace().any(|w| w == first_word),
            "{:?} does not overlap {:?}",
            pair[1].text,
            pair[0].text
        );
    }
}

#[tokio::test]
async fn given_word_longer_than_budget_when_split_then_broken_into_graphemes() {
    let splitter = TokenTextSplitter::new(5, 0).unwrap();
    let text = "x".repeat(300);

    let chunks = split(&splitter, &text).await;

    assert!(chunks.len() > 1);
    let total: usize = chunks.iter().map(|c| c.text.chars().count()).sum();
    assert_eq!(total, 300);
    assert!(chunks.iter().all(|c| splitter.count_tokens(&c.text) <= 5));
}

#[tokio::test]
async fn given_split_when_inspected_then_indices_and_ids_follow_document() {
    let splitter = TokenTextSplitter::new(10, 2).unwrap();
    let document_id = DocumentId::new();

    let chunks = splitter
        .split(&numbered_words(60), "doc.txt", document_id)
        .await
        .unwrap();

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.sequence_index, i);
        assert_eq!(chunk.document_id, document_id);
        assert_eq!(
            chunk.record_id().as_str(),
            format!("doc_{i}_{}", document_id.as_uuid())
        );
    }
}

#[test]
fn given_text_when_counted_then_matches_cl100k() {
    let splitter = TokenTextSplitter::new(10, 0).unwrap();

    assert_eq!(splitter.count_tokens(""), 0);
    assert_eq!(splitter.count_tokens("hello world"), 2);
}
