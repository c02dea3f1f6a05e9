//! Hand-off of pointer values to network-building code
//!
//! [`SemanticPointer::construct`] produces a [`PointerNode`]: a constant
//! tensor output carrying the pointer's vector unchanged, labelled with the
//! pointer's name.

use candle_core::{DType, Device, Tensor};

use super::SemanticPointer;
use crate::Result;

/// Constant-output node built from a semantic pointer
#[derive(Debug, Clone)]
pub struct PointerNode {
    label: Option<String>,
    output: Tensor,
}

impl PointerNode {
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Output tensor, shape `[d]`, dtype f64
    pub fn output(&self) -> &Tensor {
        &self.output
    }

    pub fn size_out(&self) -> usize {
        self.output.elem_count()
    }

    /// Copy the output back to host memory
    pub fn output_vec(&self) -> Result<Vec<f64>> {
        Ok(self.output.to_dtype(DType::F64)?.to_vec1::<f64>()?)
    }
}

impl SemanticPointer {
    /// Build a constant node emitting this pointer's vector on `device`
    ///
    /// The output is f64; devices without f64 support return a candle error.
    pub fn construct(&self, device: &Device) -> Result<PointerNode> {
        let output = Tensor::from_slice(self.v(), self.len(), device)?;
        tracing::debug!(label = ?self.name(), size_out = self.len(), "constructed pointer node");
        Ok(PointerNode {
            label: self.name().map(str::to_string),
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_exposes_vector_unchanged() {
        let a = SemanticPointer::new(vec![0.25, -1.5, 3.0])
            .unwrap()
            .with_name("A");
        let node = a.construct(&Device::Cpu).unwrap();
        assert_eq!(node.label(), Some("A"));
        assert_eq!(node.size_out(), 3);
        assert_eq!(node.output().dims(), &[3]);
        assert_eq!(node.output_vec().unwrap(), a.v());
    }

    #[test]
    fn test_construct_unnamed() {
        let a = SemanticPointer::new(vec![1.0]).unwrap();
        let node = a.construct(&Device::Cpu).unwrap();
        assert!(node.label().is_none());
    }
}
