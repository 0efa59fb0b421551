use crate::graph::FlowGraph;
use crate::model::Node;
use std::fmt;

/// How far a step got through conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Columns computed.
    Converted,
    /// Recognized type, but the exact columns could not be determined.
    ColumnsUnknown,
    /// The step type or shape was not recognized.
    Unrecognized,
}

impl StepStatus {
    pub fn of(node: &Node) -> Self {
        if node.is_unknown() {
            StepStatus::Unrecognized
        } else if node.columns().is_computed() {
            StepStatus::Converted
        } else {
            StepStatus::ColumnsUnknown
        }
    }

    fn label(&self) -> &'static str {
        match self {
            StepStatus::Converted => "converted",
            StepStatus::ColumnsUnknown => "columns unknown",
            StepStatus::Unrecognized => "unrecognized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub id: String,
    pub name: String,
    pub node_type: String,
    pub model_name: String,
    pub status: StepStatus,
}

/// Per-step outcome of a run plus the aggregate counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn from_graph(graph: &FlowGraph) -> Self {
        let steps = graph
            .nodes()
            .map(|node| StepReport {
                id: node.id().to_string(),
                name: node.name().to_string(),
                node_type: node.node_type().to_string(),
                model_name: node.reference_name().to_string(),
                status: StepStatus::of(node),
            })
            .collect();
        Self { steps }
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    pub fn converted(&self) -> usize {
        self.count(StepStatus::Converted)
    }

    pub fn columns_unknown(&self) -> usize {
        self.count(StepStatus::ColumnsUnknown)
    }

    pub fn unrecognized(&self) -> usize {
        self.count(StepStatus::Unrecognized)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(
                f,
                "[{}] {} ({}) -> {}",
                step.status.label(),
                step.name,
                step.node_type,
                step.model_name
            )?;
        }
        write!(
            f,
            "{} steps: {} converted, {} with unknown columns, {} unrecognized",
            self.steps.len(),
            self.converted(),
            self.columns_unknown(),
            self.unrecognized()
        )
    }
}
