/// Asserts the seven list sizes of the territory at `coords`.
#[macro_export]
macro_rules! assert_list_sizes {
    ($state:expr, $coords:expr, $sizes:expr) => {
        let sizes = $state.territorial_lists($coords).sizes();
        assert_eq!(sizes, $sizes, "List sizes of cell {} differ", $coords);
    };
}

/// Asserts that every territory's tags agree with its delimiters.
#[macro_export]
macro_rules! assert_territories_consistent {
    ($state:expr) => {
        if let Err(violation) = $state.check_all_territories() {
            panic!("Inconsistent territory: {}", violation);
        }
    };
}
