use serde::{Deserialize, Serialize};

/// A dense embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim],
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn dot(&self, other: &Vector) -> f32 {
        dot_product(&self.data, &other.data)
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        dot_product(&self.data, &self.data).sqrt()
    }

    /// Cosine similarity in [-1, 1].
    ///
    /// A zero-magnitude operand yields 0.0 rather than NaN, as does a
    /// width mismatch.
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let norm_a = self.norm();
        let norm_b = other.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        (self.dot(other) / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }

    /// Normalize the vector to unit length
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > f32::EPSILON {
            let inv_norm = 1.0 / norm;
            for x in &mut self.data {
                *x *= inv_norm;
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut v = self.clone();
        v.normalize();
        v
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

/// Dot product with two accumulators for better pipelining.
/// Slices of different length contribute only their common prefix.
#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let mut sum1 = 0.0f32;
    let mut sum2 = 0.0f32;
    let mut i = 0;

    while i + 1 < len {
        sum1 += a[i] * b[i];
        sum2 += a[i + 1] * b[i + 1];
        i += 2;
    }
    if i < len {
        sum1 += a[i] * b[i];
    }

    sum1 + sum2
}
