//! Opinion dynamics on hypergraphs (spec.md §4.G): Deffuant–Weisbuch,
//! Hegselmann–Krause, and voter-model updates, each paired with one of
//! three scheduling drivers ([`drivers`]).

pub mod drivers;
pub mod kernels;

pub use drivers::{
    run_random_group_deffuant_weisbuch, run_random_node_voter_model,
    run_synchronous_hegselmann_krause,
};
