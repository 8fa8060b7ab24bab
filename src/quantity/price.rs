quantity!(MegawattHourRate, suffix: "PLN/MWh", precision: 2);
