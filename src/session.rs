use crate::models::{AgentRecord, BatchResult, ResultsMap};
use crate::roster::Roster;
use tracing::{debug, warn};

/// Ticket for one single-item dispatch cycle
///
/// Carries the roster as it was when the cycle started; later edits are not
/// visible through it.
#[derive(Debug, Clone)]
pub struct Cycle {
    seq: u64,
    agents: Vec<AgentRecord>,
}

impl Cycle {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn agents(&self) -> &[AgentRecord] {
        &self.agents
    }
}

/// Ticket for one batch cycle
#[derive(Debug, Clone, Copy)]
pub struct BatchCycle {
    seq: u64,
}

/// Everything the operator sees: roster, latest results, latest leaderboard
///
/// Operations consume the session and return the next one. Results are only
/// accepted from the most recently started cycle of each kind; an older
/// cycle finishing late is discarded.
#[derive(Debug, Clone, Default)]
pub struct Session {
    roster: Roster,
    results: ResultsMap,
    batch: Option<BatchResult>,
    last_cycle: u64,
    last_batch: u64,
}

impl Session {
    pub fn new(roster: Roster) -> Self {
        Self {
            roster,
            ..Self::default()
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn results(&self) -> &ResultsMap {
        &self.results
    }

    pub fn batch(&self) -> Option<&BatchResult> {
        self.batch.as_ref()
    }

    /// Apply an edit to the roster
    #[must_use]
    pub fn edit_roster(mut self, edit: impl FnOnce(Roster) -> Roster) -> Self {
        self.roster = edit(self.roster);
        self
    }

    /// Start a dispatch cycle over the current roster
    #[must_use]
    pub fn begin_cycle(mut self) -> (Self, Cycle) {
        self.last_cycle += 1;
        let cycle = Cycle {
            seq: self.last_cycle,
            agents: self.roster.snapshot(),
        };
        debug!(cycle = cycle.seq, agents = cycle.agents.len(), "Starting evaluation cycle");
        (self, cycle)
    }

    /// Replace the results wholesale, unless a newer cycle has started since
    #[must_use]
    pub fn complete_cycle(mut self, cycle: Cycle, results: ResultsMap) -> Self {
        if cycle.seq != self.last_cycle {
            warn!(
                cycle = cycle.seq,
                latest = self.last_cycle,
                "Discarding results from stale evaluation cycle"
            );
            return self;
        }
        self.results = results;
        self
    }

    /// Start a batch cycle
    #[must_use]
    pub fn begin_batch(mut self) -> (Self, BatchCycle) {
        self.last_batch += 1;
        let cycle = BatchCycle {
            seq: self.last_batch,
        };
        (self, cycle)
    }

    /// Replace the leaderboard, unless a newer batch has started since
    ///
    /// Failed batches never reach this point, so the previous leaderboard
    /// stays in place.
    #[must_use]
    pub fn complete_batch(mut self, cycle: BatchCycle, result: BatchResult) -> Self {
        if cycle.seq != self.last_batch {
            warn!(
                cycle = cycle.seq,
                latest = self.last_batch,
                "Discarding leaderboard from stale batch cycle"
            );
            return self;
        }
        self.batch = Some(result);
        self
    }
}
