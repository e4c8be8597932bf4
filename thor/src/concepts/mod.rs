pub mod neighbour;
pub mod packet;
