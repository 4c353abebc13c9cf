pub mod preset;

pub mod phase0 {
    pub mod containers;
    pub mod primitives;
}

pub mod deneb {
    pub mod consts;
    pub mod containers;
    pub mod primitives;

    mod container_impls;
}
