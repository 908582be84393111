mod device;
mod recorder;
mod support;
