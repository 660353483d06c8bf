//! Generator context construction.

use crate::quality::Candidate;

/// One block per candidate, numbered from 1:
///
/// ```text
/// [위키피디아 문서 1] 제목: 서울 | 분류: 지리 | 유사도: 0.812
/// <body>
/// ```
///
/// Blocks are joined with a blank line. A missing or empty title both fall
/// back to `문서 n`, so every block carries a usable title.
pub fn build_context(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let n = i + 1;
            let mut header = match candidate.title.as_deref().filter(|t| !t.is_empty()) {
                Some(title) => format!("제목: {}", title),
                None => format!("제목: 문서 {}", n),
            };
            if let Some(category) = candidate.metadata_str("category").filter(|c| !c.is_empty()) {
                header.push_str(&format!(" | 분류: {}", category));
            }
            header.push_str(&format!(" | 유사도: {:.3}", candidate.similarity));

            format!("[위키피디아 문서 {}] {}\n{}\n", n, header, candidate.body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
