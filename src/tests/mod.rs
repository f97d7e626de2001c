//! End-to-end scenarios over the resolver, scale controller, liveness
//! guards and the drain sequence, driven through in-memory fakes.


pub mod support;
