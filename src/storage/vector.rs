//! Embedding (de)serialization and exact nearest-neighbour ranking
//!
//! Profiles are re-embedded in place on every ingestion, so ranking is an exact
//! L2 scan over the stored vectors rather than an approximate index.

use ndarray::{Array2, ArrayView1};

/// Little-endian f32 bytes for a BLOB column
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Inverse of [`encode_vector`]; trailing partial values are ignored
pub fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Rank stored vectors by Euclidean distance to `query`, ascending.
///
/// Rows whose dimension differs from the query are skipped. Ties keep input
/// order.
pub fn nearest(query: &[f32], rows: &[(i64, Vec<f32>)], limit: usize) -> Vec<(i64, f32)> {
    let dim = query.len();
    let usable: Vec<&(i64, Vec<f32>)> = rows
        .iter()
        .filter(|(id, vector)| {
            let ok = vector.len() == dim;
            if !ok {
                tracing::warn!(
                    "Skipping profile {} with embedding dimension {} (expected {})",
                    id,
                    vector.len(),
                    dim
                );
            }
            ok
        })
        .collect();

    if usable.is_empty() || dim == 0 || limit == 0 {
        return Vec::new();
    }

    let flat: Vec<f32> = usable.iter().flat_map(|(_, v)| v.iter().copied()).collect();
    let matrix = match Array2::from_shape_vec((usable.len(), dim), flat) {
        Ok(matrix) => matrix,
        Err(_) => return Vec::new(),
    };
    let query = ArrayView1::from(query);

    let mut ranked: Vec<(i64, f32)> = matrix
        .rows()
        .into_iter()
        .zip(usable.iter())
        .map(|(row, (id, _))| {
            let diff = &row - &query;
            (*id, diff.dot(&diff).sqrt())
        })
        .collect();

    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let vector = vec![0.25, -1.5, 3.0];
        assert_eq!(decode_vector(&encode_vector(&vector)), vector);
        assert!(decode_vector(&[]).is_empty());
    }

    #[test]
    fn test_nearest_orders_by_distance() {
        let rows = vec![
            (1, vec![0.0, 1.0]),
            (2, vec![1.0, 0.1]),
            (3, vec![1.0, 0.0]),
        ];
        let ranked = nearest(&[1.0, 0.0], &rows, 10);

        let ids: Vec<i64> = ranked.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(ranked[0].1.abs() < 1e-6);
        assert!((ranked[1].1 - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_truncates_and_skips_mismatched_rows() {
        let rows = vec![
            (1, vec![0.0, 0.0, 0.0]),
            (2, vec![0.5, 0.5]),
            (3, vec![2.0, 2.0]),
        ];
        let ranked = nearest(&[0.0, 0.0], &rows, 1);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, 2);
    }
}
