/// Pure layout resolution shared by the frame compositor and the filter-graph builder.
pub mod engine;
