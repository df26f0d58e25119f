mod forces;
mod interaction;
mod lifecycle;
mod trail;
