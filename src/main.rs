fn main() {
    archery_game::game::run();
}
