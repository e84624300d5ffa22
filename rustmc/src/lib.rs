// src/lib.rs
pub mod chain {
    pub mod error;
    pub mod mass;
    pub mod params;
    pub mod reader;
    pub mod scan;
    pub mod scatter;
}

pub mod post {
    pub mod accumulate;
    pub mod report;
}

pub mod settings;
