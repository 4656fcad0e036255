pub mod edge_guard;
