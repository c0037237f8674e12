// ============================================
// Stego Launcher - build.rs
// ============================================
// This file runs BEFORE the main program is compiled.
// It compiles the Slint UI files (.slint) into Rust code.
//
// You don't need to modify this file unless you rename the main .slint file.
// ============================================

fn main() {
    // Compile the main Slint UI file
    // This converts src/ui/main.slint into Rust code that main.rs can use
    if let Err(e) = slint_build::compile("src/ui/main.slint") {
        eprintln!("============================================");
        eprintln!("ERROR: Failed to compile Slint UI");
        eprintln!("============================================");
        eprintln!("{}", e);
        eprintln!();
        eprintln!("Make sure src/ui/main.slint exists and has valid syntax.");
        eprintln!("============================================");

        // Exit with error code so the build fails
        std::process::exit(1);
    }
}
