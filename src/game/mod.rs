pub mod flash;
pub mod judgment;
pub mod life;
pub mod monster;
pub mod movement;
pub mod sequence;
pub mod session;
pub mod spawner;
pub mod symbol;
pub mod target;
pub mod timing;
pub mod turn;
