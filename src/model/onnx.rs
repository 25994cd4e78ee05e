//! ONNX Runtime classifier. Input: [rows, features] f32. Output 0: class ids (int64), as exported
//! by skl2onnx for tree ensembles.

use super::{Classifier, ClassifierError};
use crate::features::FeatureMatrix;
use ndarray::{Array2, CowArray};
use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};
use std::path::Path;
use std::sync::Arc;

pub struct OnnxClassifier {
    _env: Arc<Environment>,
    session: Session,
    name: String,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let env = Environment::builder()
            .with_name("flow-labeler")
            .build()?
            .into_arc();
        let session = SessionBuilder::new(&env)?
            .with_optimization_level(GraphOptimizationLevel::Level1)?
            .with_model_from_file(path)?;
        if session.inputs.is_empty() {
            return Err(ClassifierError::Shape("model declares no inputs".into()));
        }
        Ok(Self {
            _env: env,
            session,
            name: path.display().to_string(),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<i64>, ClassifierError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        let arr = Array2::from_shape_vec((features.len(), features.dim()), features.values().to_vec())
            .map_err(|e| ClassifierError::Shape(e.to_string()))?;
        let arr = CowArray::from(arr.into_dyn());
        let input = Value::from_array(self.session.allocator(), &arr)?;

        let outputs = self.session.run(vec![input])?;
        let labels = outputs
            .first()
            .ok_or_else(|| ClassifierError::Output("no outputs".into()))?;
        let tensor = labels.try_extract::<i64>()?;
        let ids: Vec<i64> = tensor.view().iter().copied().collect();
        Ok(ids)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
