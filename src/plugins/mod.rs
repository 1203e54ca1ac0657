pub mod sim_plugin;
