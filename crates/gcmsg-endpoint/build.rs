fn main() {
    println!("cargo:rerun-if-env-changed=STEAM_SDK_LOCATION");
    println!("cargo:rerun-if-env-changed=GCMSG_NATIVE_LIB_DIR");
    println!("cargo:rerun-if-env-changed=GCMSG_NATIVE_LIB");

    #[cfg(feature = "steamworks")]
    steamworks::build();
}

#[cfg(feature = "steamworks")]
mod steamworks {
    use std::env;
    use std::path::PathBuf;

    const WRAPPER_SOURCE: &str = "lib/steam_gc_wrapper.cpp";
    const WRAPPER_HEADER: &str = "lib/steam_gc_wrapper.h";

    pub fn build() {
        println!("cargo:rerun-if-changed={WRAPPER_SOURCE}");
        println!("cargo:rerun-if-changed={WRAPPER_HEADER}");

        // Without STEAM_SDK_LOCATION the SDK headers are expected on the
        // compiler's default include path.
        let mut wrapper = cc::Build::new();
        wrapper.cpp(true).file(WRAPPER_SOURCE).include("lib");
        if let Some(sdk) = env::var_os("STEAM_SDK_LOCATION") {
            wrapper.include(PathBuf::from(sdk).join("public"));
        }
        wrapper.compile("steam_gc_wrapper");

        // Vendor runtime the wrapper calls into.
        if let Ok(dir) = env::var("GCMSG_NATIVE_LIB_DIR") {
            println!("cargo:rustc-link-search=native={dir}");
        }
        let target = env::var("TARGET").unwrap_or_default();
        let runtime = env::var("GCMSG_NATIVE_LIB").unwrap_or_else(|_| {
            if target.contains("windows") && !target.contains("i686") {
                "steam_api64".to_string()
            } else {
                "steam_api".to_string()
            }
        });
        println!("cargo:rustc-link-lib=dylib={runtime}");
    }
}
