
pub mod file;
pub mod time;
pub mod hash;

// numeric core
pub mod cpu {
    pub mod decimal;
    pub mod precision;
    pub mod pi;
    pub mod binary_split;
}
