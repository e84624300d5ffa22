// data module
pub mod data {
    pub mod cluster;
    pub mod filters;
    pub mod star;
}

// model module
pub mod models {
    pub mod chab;
    pub mod grid;
    pub mod ifmr;
}

// algorithm module
pub mod algorithm {
    pub mod photometry;
    pub mod stats;
}
