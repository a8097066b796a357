// Maps a range into a collection, across rayon's pool natively and
// serially on wasm where there are no threads.

#[cfg(not(target_arch = "wasm32"))]
macro_rules! par_map_collect {
    ($range:expr, $f:expr) => {{
        use rayon::prelude::*;
        $range.into_par_iter().map($f).collect()
    }};
}

#[cfg(target_arch = "wasm32")]
macro_rules! par_map_collect {
    ($range:expr, $f:expr) => {
        $range.into_iter().map($f).collect()
    };
}
