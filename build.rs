//! Build script for hellompi
//!
//! Locates an MPI installation, compiles the C shim in `csrc/` against it and
//! emits the link flags. Discovery order:
//!
//! 1. `HELLOMPI_MPI_DIR` (an install prefix with `include/` and `lib/`)
//! 2. `MPI_PKG_CONFIG` (an explicit pkg-config package name)
//! 3. pkg-config packages `mpich`, `ompi`, `mpi`
//! 4. `mpicc -show` (or `$MPICC -show`)
//! 5. `CRAY_MPICH_DIR`
//! 6. well-known prefixes

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const SHIM_SOURCE: &str = "csrc/hellompi.c";
const SHIM_HEADER: &str = "csrc/hellompi.h";

fn main() {
    println!("cargo:rerun-if-changed={SHIM_SOURCE}");
    println!("cargo:rerun-if-changed={SHIM_HEADER}");
    for var in ["HELLOMPI_MPI_DIR", "MPI_PKG_CONFIG", "MPICC", "CRAY_MPICH_DIR"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    let mpi = find_mpi_config();

    let mut build = cc::Build::new();
    build
        .file(SHIM_SOURCE)
        .include("csrc")
        .warnings(true)
        .extra_warnings(true);
    for path in &mpi.include_paths {
        build.include(path);
    }
    if env::var("PROFILE").unwrap_or_default() == "release" {
        build.opt_level(3);
    }
    build.compile("hellompi");

    for path in &mpi.link_paths {
        println!("cargo:rustc-link-search=native={}", path.display());
        // RPATH so the binaries find the same libmpi at runtime
        println!("cargo:rustc-link-arg=-Wl,-rpath,{}", path.display());
    }
    for lib in &mpi.libs {
        println!("cargo:rustc-link-lib={lib}");
    }
    if let Some(version) = mpi.version.filter(|v| !v.trim().is_empty()) {
        println!("cargo:rustc-env=HELLOMPI_MPI_VERSION={version}");
    }
}

struct MpiConfig {
    include_paths: Vec<PathBuf>,
    link_paths: Vec<PathBuf>,
    libs: Vec<String>,
    version: Option<String>,
}

impl MpiConfig {
    fn from_prefix(prefix: &Path) -> Option<Self> {
        let include = prefix.join("include");
        if !include.join("mpi.h").exists() {
            return None;
        }
        let link_paths = ["lib", "lib64"]
            .iter()
            .map(|dir| prefix.join(dir))
            .filter(|dir| dir.is_dir())
            .collect();
        Some(MpiConfig {
            include_paths: vec![include],
            link_paths,
            libs: vec!["mpi".to_string()],
            version: None,
        })
    }
}

fn find_mpi_config() -> MpiConfig {
    if let Ok(dir) = env::var("HELLOMPI_MPI_DIR") {
        if let Some(config) = MpiConfig::from_prefix(Path::new(&dir)) {
            eprintln!("Found MPI via HELLOMPI_MPI_DIR={dir}");
            return config;
        }
    }

    if let Ok(pkg_name) = env::var("MPI_PKG_CONFIG") {
        if let Ok(config) = try_pkg_config(&pkg_name) {
            eprintln!("Found MPI via MPI_PKG_CONFIG={pkg_name}");
            return config;
        }
    }

    for pkg_name in ["mpich", "ompi", "mpi"] {
        if let Ok(config) = try_pkg_config(pkg_name) {
            eprintln!("Found MPI via pkg-config: {pkg_name}");
            return config;
        }
    }

    match try_mpicc() {
        Ok(config) => {
            eprintln!("Found MPI via mpicc");
            return config;
        }
        Err(e) => eprintln!("mpicc probe failed: {e}"),
    }

    if let Ok(dir) = env::var("CRAY_MPICH_DIR") {
        if let Some(config) = MpiConfig::from_prefix(Path::new(&dir)) {
            eprintln!("Found Cray MPI at {dir}");
            return config;
        }
    }

    for prefix in [
        "/usr",
        "/usr/local",
        "/usr/lib/x86_64-linux-gnu/openmpi",
        "/opt/mpich",
        "/opt/openmpi",
    ] {
        if let Some(config) = MpiConfig::from_prefix(Path::new(prefix)) {
            eprintln!("Found MPI at {prefix}");
            return config;
        }
    }

    panic!(
        "Could not find an MPI installation. Install MPICH or Open MPI and either:\n\
         - set HELLOMPI_MPI_DIR to the install prefix\n\
         - set MPI_PKG_CONFIG to the pkg-config name (e.g. 'mpich')\n\
         - put 'mpicc' on PATH (or point MPICC at it)\n\
         - set CRAY_MPICH_DIR on Cray systems"
    );
}

fn try_pkg_config(name: &str) -> Result<MpiConfig, pkg_config::Error> {
    let lib = pkg_config::Config::new()
        .cargo_metadata(false)
        .probe(name)?;

    Ok(MpiConfig {
        include_paths: lib.include_paths,
        link_paths: lib.link_paths,
        libs: lib.libs,
        version: Some(lib.version),
    })
}

fn try_mpicc() -> Result<MpiConfig, String> {
    let mpicc = env::var("MPICC").unwrap_or_else(|_| "mpicc".to_string());

    let output = Command::new(&mpicc)
        .arg("-show")
        .output()
        .map_err(|e| format!("failed to run '{mpicc}': {e}"))?;
    if !output.status.success() {
        return Err(format!("'{mpicc} -show' exited with {}", output.status));
    }

    Ok(parse_mpicc_show(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_mpicc_show(output: &str) -> MpiConfig {
    let mut config = MpiConfig {
        include_paths: Vec::new(),
        link_paths: Vec::new(),
        libs: Vec::new(),
        version: None,
    };

    for part in output.split_whitespace() {
        if let Some(path) = part.strip_prefix("-I") {
            config.include_paths.push(PathBuf::from(path));
        } else if let Some(path) = part.strip_prefix("-L") {
            config.link_paths.push(PathBuf::from(path));
        } else if let Some(lib) = part.strip_prefix("-l") {
            config.libs.push(lib.to_string());
        }
    }

    if config.libs.is_empty() {
        config.libs.push("mpi".to_string());
    }
    config
}
