use serde::{Deserialize, Serialize};

/// A dense vector produced by the embedding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Builds an embedding scaled to unit L2 norm. A zero vector stays zero.
    pub fn normalized(values: Vec<f32>) -> Self {
        let mut embedding = Self::new(values);
        embedding.normalize();
        embedding
    }

    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    pub fn norm(&self) -> f32 {
        self.norm_f64() as f32
    }

    /// Accumulated in f64 so components near `f32::MAX` cannot overflow the sum.
    fn norm_f64(&self) -> f64 {
        self.values
            .iter()
            .map(|&x| f64::from(x) * f64::from(x))
            .sum::<f64>()
            .sqrt()
    }

    pub fn normalize(&mut self) {
        let norm = self.norm_f64();
        if norm == 0.0 || !norm.is_finite() {
            return;
        }
        for value in &mut self.values {
            *value = (f64::from(*value) / norm) as f32;
        }
    }

    pub fn cosine_similarity(&self, other: &Self) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }

        let dot_product: f64 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(&a, &b)| f64::from(a) * f64::from(b))
            .sum();

        let magnitude_a = self.norm_f64();
        let magnitude_b = other.norm_f64();

        if magnitude_a == 0.0 || magnitude_b == 0.0 {
            return 0.0;
        }

        (dot_product / (magnitude_a * magnitude_b)) as f32
    }

    /// Cosine distance in `[0, 2]`.
    pub fn cosine_distance(&self, other: &Self) -> f32 {
        1.0 - self.cosine_similarity(other)
    }
}
