mod assembly;
mod config;
mod connectivity;
mod elasticity;
mod field;
mod index_map;
mod io;
mod laplace;
mod partition;
mod sparsity;
