//! Integration tests: full cycles against in-memory league fakes and a
//! local HTTP stand-in for the transactions endpoint.

mod cycle;
mod fake_league;
mod transactions;
