pub mod setlikechannel;
