fn main() {
    // Embedded sqlx migrations are compiled in; rebuild when they change.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    println!("cargo:rerun-if-changed=migrations");
}
