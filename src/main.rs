#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    sge_shell_lib::desktop::run();
}
