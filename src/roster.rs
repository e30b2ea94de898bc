use crate::models::AgentRecord;

/// Editable field of an agent record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentField {
    Id,
    Prompt,
    Response,
    Metadata,
}

/// Ordered collection of agent records edited by the operator
///
/// Edits consume the roster and hand back the new value. Indices out of range
/// leave the roster as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    agents: Vec<AgentRecord>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new().add().add()
    }
}

impl Roster {
    /// Create an empty roster
    pub fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Append a blank record with the next free `Agent-<n>` id
    #[must_use]
    pub fn add(mut self) -> Self {
        let id = self.next_id();
        self.agents.push(AgentRecord::new(id));
        self
    }

    /// Replace one field of the record at `index`
    #[must_use]
    pub fn update(mut self, index: usize, field: AgentField, value: impl Into<String>) -> Self {
        if let Some(agent) = self.agents.get_mut(index) {
            let value = value.into();
            match field {
                AgentField::Id => agent.id = value,
                AgentField::Prompt => agent.prompt = value,
                AgentField::Response => agent.response = value,
                AgentField::Metadata => agent.raw_metadata = value,
            }
        }
        self
    }

    /// Delete the record at `index`; remaining ids are kept as they are
    #[must_use]
    pub fn remove(mut self, index: usize) -> Self {
        if index < self.agents.len() {
            self.agents.remove(index);
        }
        self
    }

    pub fn agents(&self) -> &[AgentRecord] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Point-in-time copy of the records for a dispatch cycle
    pub fn snapshot(&self) -> Vec<AgentRecord> {
        self.agents.clone()
    }

    fn next_id(&self) -> String {
        let mut n = self.agents.len() + 1;
        loop {
            let candidate = format!("Agent-{}", n);
            if !self.agents.iter().any(|a| a.id == candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}
