mod kernel;
mod link;
mod store;
mod umcc;
