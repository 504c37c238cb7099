mod arbitrary;

mod deep_nesting;
mod lookup_matrix;
