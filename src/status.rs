/// Epidemic status of a node.
///
/// SIS models simply never produce `Recovered`; keeping one enum for both
/// avoids a second near-identical type and matches spec.md's "small finite
/// state alphabet" data model (§3) rather than comparing strings in the
/// inner loop (Design Notes §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Susceptible,
    Infected,
    Recovered,
}

impl Status {
    pub fn is_susceptible(self) -> bool {
        matches!(self, Status::Susceptible)
    }

    pub fn is_infected(self) -> bool {
        matches!(self, Status::Infected)
    }

    pub fn is_recovered(self) -> bool {
        matches!(self, Status::Recovered)
    }
}

/// Opinion held by a node under an opinion-dynamics driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpinionStatus {
    /// Discrete opinion label, used by the voter model.
    Discrete(u32),
    /// Continuous opinion value in an arbitrary real range, used by
    /// Deffuant–Weisbuch and Hegselmann–Krause.
    Continuous(f64),
}

impl OpinionStatus {
    pub fn as_continuous(self) -> Option<f64> {
        match self {
            OpinionStatus::Continuous(x) => Some(x),
            OpinionStatus::Discrete(_) => None,
        }
    }

    pub fn as_discrete(self) -> Option<u32> {
        match self {
            OpinionStatus::Discrete(x) => Some(x),
            OpinionStatus::Continuous(_) => None,
        }
    }
}
