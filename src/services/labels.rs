/// Labels served by the default deployment, in model output order.
pub const DEFAULT_LABELS: [&str; 6] = [
    "Angus",
    "Belted Galloway",
    "Charolais",
    "Desconocido",
    "Highland",
    "Limousin",
];

/// Ordered class names matching the model's output vector.
#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: Vec<String>,
}

/// The winning class of a score vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("label table is empty")]
    Empty,

    #[error("expected {expected} scores, got {got}")]
    ScoreCountMismatch { expected: usize, got: usize },
}

impl LabelTable {
    pub fn new(labels: Vec<String>) -> Result<Self, LabelError> {
        let labels: Vec<String> = labels
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if labels.is_empty() {
            return Err(LabelError::Empty);
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Pick the highest score. On ties the lowest index wins.
    pub fn classify(&self, scores: &[f64]) -> Result<Prediction, LabelError> {
        if scores.len() != self.labels.len() {
            return Err(LabelError::ScoreCountMismatch {
                expected: self.labels.len(),
                got: scores.len(),
            });
        }

        let mut best = 0;
        for (idx, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = idx;
            }
        }

        Ok(Prediction {
            label: self.labels[best].clone(),
            score: scores[best],
        })
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }
}
