fn main() {
    modlaunch_lib::run()
}
