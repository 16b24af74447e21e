// handlers/elevated/mod.rs - Elevated handlers (admin role required)
//
// Security Level: session whose role grants `admin`
// Route Prefix: /api/admin/*

pub mod admin;
