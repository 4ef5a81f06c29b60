//! Vector math: cosine similarity and top-k selection.

use std::collections::HashMap;

use crate::content::Content;
use crate::error::{RagraphError, Result};

/// Compute cosine similarity between two vectors.
///
/// An empty or zero-magnitude vector yields `0.0`; non-finite results are
/// coerced to `0.0`. Vectors of differing non-zero widths fail with
/// `DimensionMismatch`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.is_empty() || b.is_empty() {
        return Ok(0.0);
    }
    if a.len() != b.len() {
        return Err(RagraphError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(0.0);
    }

    let similarity = dot / (mag_a * mag_b);
    if similarity.is_finite() {
        Ok(similarity)
    } else {
        Ok(0.0)
    }
}

/// Score one query embedding against many embeddings in a single call.
pub fn cosine_similarity_batch<'a, I>(query: &[f32], embeddings: I) -> Result<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    embeddings
        .into_iter()
        .map(|embedding| cosine_similarity(query, embedding))
        .collect()
}

/// Row-wise cosine similarities between two embedding sets.
pub fn cosine_similarity_matrix(xs: &[Vec<f32>], ys: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
    xs.iter()
        .map(|x| cosine_similarity_batch(x, ys.iter().map(|y| y.as_slice())))
        .collect()
}

/// Select the top `k` contents by similarity to `embedding`.
///
/// Contents are de-duplicated by id first (last write wins, first position
/// kept) so the result holds `k` distinct documents. Ranking is descending
/// by similarity; ties preserve the original order.
pub fn top_k(contents: Vec<Content>, embedding: &[f32], k: usize) -> Result<Vec<Content>> {
    let mut deduped: Vec<Content> = Vec::with_capacity(contents.len());
    let mut position: HashMap<String, usize> = HashMap::new();
    for content in contents {
        match position.get(&content.id) {
            Some(&index) => deduped[index] = content,
            None => {
                position.insert(content.id.clone(), deduped.len());
                deduped.push(content);
            }
        }
    }

    let scores = cosine_similarity_batch(embedding, deduped.iter().map(|c| c.embedding.as_slice()))?;
    let mut scored: Vec<(f32, Content)> = scores.into_iter().zip(deduped).collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    Ok(scored.into_iter().take(k).map(|(_, c)| c).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let similarity = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]).unwrap();
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let similarity = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(similarity.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let similarity = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap();
        assert!((similarity + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_magnitude() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_similarity_empty_is_zero() {
        assert_eq!(cosine_similarity(&[], &[1.0, 2.0]).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch() {
        assert!(matches!(
            cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]),
            Err(RagraphError::DimensionMismatch { left: 2, right: 3 })
        ));
    }

    #[test]
    fn test_cosine_similarity_magnitude_independent() {
        let similarity = cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]).unwrap();
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_matrix() {
        let xs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let ys = vec![vec![1.0, 0.0]];
        let matrix = cosine_similarity_matrix(&xs, &ys).unwrap();
        assert!((matrix[0][0] - 1.0).abs() < 1e-6);
        assert!(matrix[1][0].abs() < 1e-6);
    }

    fn content(id: &str, embedding: Vec<f32>) -> Content {
        Content::new(id, id, embedding)
    }

    #[test]
    fn test_top_k_ranks_descending() {
        let contents = vec![
            content("far", vec![0.0, 1.0]),
            content("near", vec![1.0, 0.0]),
            content("mid", vec![1.0, 1.0]),
        ];
        let top = top_k(contents, &[1.0, 0.0], 2).unwrap();
        let ids: Vec<&str> = top.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
    }

    #[test]
    fn test_top_k_deduplicates_last_write_wins() {
        let contents = vec![
            content("a", vec![1.0, 0.0]),
            content("b", vec![0.5, 0.5]),
            Content::new("a", "updated", vec![1.0, 0.0]),
        ];
        let top = top_k(contents, &[1.0, 0.0], 5).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "a");
        assert_eq!(top[0].content, "updated");
    }

    #[test]
    fn test_top_k_ties_keep_insertion_order() {
        let contents = vec![
            content("first", vec![1.0, 0.0]),
            content("second", vec![2.0, 0.0]),
            content("third", vec![3.0, 0.0]),
        ];
        let top = top_k(contents, &[1.0, 0.0], 3).unwrap();
        let ids: Vec<&str> = top.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_top_k_idempotent() {
        let contents = vec![
            content("a", vec![1.0, 0.0]),
            content("b", vec![1.0, 1.0]),
            content("c", vec![0.0, 1.0]),
        ];
        let once = top_k(contents, &[1.0, 0.0], 2).unwrap();
        let twice = top_k(once.clone(), &[1.0, 0.0], 2).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_top_k_zero_k() {
        let contents = vec![content("a", vec![1.0, 0.0])];
        assert!(top_k(contents, &[1.0, 0.0], 0).unwrap().is_empty());
    }
}
